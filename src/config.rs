use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_webhook_tolerance_secs: i64,
    pub zoho_client_id: String,
    pub zoho_client_secret: String,
    pub zoho_refresh_token: String,
    pub zoho_accounts_url: String,
    pub beds_base_url: String,
    pub beds_api_key: String,
    pub admin_email: String,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            stripe_webhook_tolerance_secs: env::var("STRIPE_WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            zoho_client_id: env::var("ZOHO_CLIENT_ID").unwrap_or_default(),
            zoho_client_secret: env::var("ZOHO_CLIENT_SECRET").unwrap_or_default(),
            zoho_refresh_token: env::var("ZOHO_REFRESH_TOKEN").unwrap_or_default(),
            zoho_accounts_url: env::var("ZOHO_ACCOUNTS_URL")
                .unwrap_or_else(|_| "https://accounts.zoho.eu".to_string()),
            beds_base_url: env::var("BEDS25_BASE_URL")
                .unwrap_or_else(|_| "https://admin.zagrodaalpakoterapii.com".to_string()),
            beds_api_key: env::var("BEDS25_API_KEY").unwrap_or_default(),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "rezerwacje@zagrodaalpakoterapii.com".to_string()),
            currency: env::var("BOOKING_CURRENCY").unwrap_or_else(|_| "pln".to_string()),
        }
    }
}
