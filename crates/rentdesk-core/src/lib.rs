//! RentDesk Core Business Logic
//!
//! This crate holds the decisions that sit between the HTTP layer and the
//! store: who may do what, how listing queries are scoped and paginated,
//! and how submitted property fields are normalized.

pub mod error;
pub mod listing;
pub mod normalize;
pub mod policy;

pub use error::CoreError;
pub use listing::{DEFAULT_LIMIT, DEFAULT_PAGE, ListingParams, Page, build_query, page_count};
pub use normalize::{FeaturesInput, image_reference, normalize_features, parse_amount};
pub use policy::{
    Action, PropertyTypePolicy, admin_registration_allowed, can_act, can_change_type,
    can_delete_user,
};
