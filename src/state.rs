use crate::config::AppConfig;
use crate::services::crm::Crm;
use crate::services::documents::{DocumentGenerator, EmailSender};
use crate::services::payments::PaymentGateway;
use crate::services::pms::Pms;

/// Every external collaborator enters through here, so tests can
/// substitute fakes without touching module-level state.
pub struct AppState {
    pub config: AppConfig,
    pub crm: Box<dyn Crm>,
    pub payments: Box<dyn PaymentGateway>,
    pub pms: Box<dyn Pms>,
    pub documents: Box<dyn DocumentGenerator>,
    pub mailer: Box<dyn EmailSender>,
}
