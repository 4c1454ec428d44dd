use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightlyPrice {
    pub date: NaiveDate,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPricing {
    pub nights: i64,
    pub total_price: i64,
    pub average_per_night: i64,
    pub currency: String,
    #[serde(default)]
    pub nightly_breakdown: Vec<NightlyPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRoom {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub max_adults: u32,
    pub max_children: u32,
    pub min_nights: i64,
    pub base_price: i64,
    pub amenities: Vec<String>,
    pub pricing: RoomPricing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub available_rooms: Vec<AvailableRoom>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomImageKind {
    Hero,
    Gallery,
    Thumbnail,
    Property,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomImage {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: RoomImageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub sort_order: i32,
}
