pub mod draft;
pub mod room;
pub mod voucher;

pub use draft::{email_is_valid, phone_is_valid, BookingDraft, Child, SelectedRoom};
pub use room::{AvailabilityResult, AvailableRoom, NightlyPrice, RoomImage, RoomImageKind, RoomPricing};
pub use voucher::{DiscountType, VoucherValidation};
