//! Sensitive Information Type (SIT) model and repository: the versioned
//! detection rules that findings get promoted into and that rulepacks
//! bundle for export.

pub mod model;
pub mod repository;

pub use model::{
    KeywordList, KeywordListItem, PrimaryElement, Sit, SitVersion, SupportingGroup,
    SupportingItem, SupportingLogic,
};
