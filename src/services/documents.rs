//! Document generation and email delivery are external collaborators:
//! the fulfillment flow only needs "produce a voucher PDF" and "mail it
//! to the internal admin address". The stub implementations keep the
//! webhook path fully functional in development.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct VoucherDocument {
    pub code: String,
    /// Whole currency units.
    pub amount: i64,
    pub currency: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub recipient_name: Option<String>,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub path: PathBuf,
}

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn voucher_pdf(&self, doc: &VoucherDocument) -> anyhow::Result<GeneratedDocument>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver the voucher to the internal admin address; a human
    /// forwards it to the recipient.
    async fn send_voucher_email(
        &self,
        to: &str,
        voucher: &VoucherDocument,
        attachment: &GeneratedDocument,
    ) -> anyhow::Result<()>;
}

/// Used when no PDF backend is configured. Names a file but writes
/// nothing; downstream email stubs log the attachment instead.
pub struct StubDocumentGenerator;

#[async_trait]
impl DocumentGenerator for StubDocumentGenerator {
    async fn voucher_pdf(&self, doc: &VoucherDocument) -> anyhow::Result<GeneratedDocument> {
        let file_name = format!("Voucher-{}-{}.pdf", doc.code, uuid::Uuid::new_v4());
        tracing::warn!(code = %doc.code, file_name, "document generator not configured; stub voucher PDF");
        Ok(GeneratedDocument {
            path: std::env::temp_dir().join(&file_name),
            file_name,
        })
    }
}

pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_voucher_email(
        &self,
        to: &str,
        voucher: &VoucherDocument,
        attachment: &GeneratedDocument,
    ) -> anyhow::Result<()> {
        tracing::info!(
            to,
            code = %voucher.code,
            attachment = %attachment.file_name,
            "email sender not configured; logging voucher email"
        );
        Ok(())
    }
}
