pub mod stripe;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct CustomerParams {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct PaymentIntentParams {
    /// Amount in the currency's minor units (grosze for PLN).
    pub amount_minor: i64,
    pub currency: String,
    pub customer_id: String,
    pub description: String,
    /// Retain the payment method for later off-session charges (the
    /// balance is collected without the guest re-entering card details).
    pub save_payment_method: bool,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct PaymentIntentHandle {
    pub id: String,
    /// Handed to the client to collect card details; card data never
    /// transits this service.
    pub client_secret: String,
}

/// Payment-processor seam. Customer lookup and creation are separate
/// calls on purpose: the read-then-create sequence is not atomic, and a
/// race between two bookings from the same email may create two
/// customers; accepted, not guarded.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn find_customer_by_email(&self, email: &str) -> anyhow::Result<Option<String>>;

    async fn create_customer(&self, params: CustomerParams) -> anyhow::Result<String>;

    async fn create_payment_intent(
        &self,
        params: PaymentIntentParams,
    ) -> anyhow::Result<PaymentIntentHandle>;
}
