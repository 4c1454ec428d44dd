pub mod records;
pub mod zoho;

use async_trait::async_trait;
use serde_json::Value;

/// CRM modules this system reads or writes. Record ids are issued by the
/// CRM; nothing here mints identifiers of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmModule {
    Bookings,
    Contacts,
    Rooms,
    Vouchers,
    Adoptions,
}

impl CrmModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrmModule::Bookings => "Bookings",
            CrmModule::Contacts => "Contacts",
            CrmModule::Rooms => "Rooms",
            CrmModule::Vouchers => "Vouchers",
            CrmModule::Adoptions => "Adoptions",
        }
    }
}

/// Details the CRM returns for a freshly created record. `name` is the
/// CRM-minted display name used as the booking reference when present.
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    pub id: String,
    pub name: Option<String>,
}

#[async_trait]
pub trait Crm: Send + Sync {
    async fn create_record(&self, module: CrmModule, data: Value) -> anyhow::Result<CreatedRecord>;

    async fn update_record(&self, module: CrmModule, id: &str, data: Value) -> anyhow::Result<()>;

    /// Search with CRM criteria syntax, e.g. `(Email:equals:a@b.c)`.
    /// An empty result set is `Ok(vec![])`, not an error.
    async fn search_records(&self, module: CrmModule, criteria: &str) -> anyhow::Result<Vec<Value>>;
}
