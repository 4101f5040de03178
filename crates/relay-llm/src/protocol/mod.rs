//! Wire format types per provider family
//!
//! Pure serde shapes; translation to and from internal types lives in
//! `convert`.

pub mod google;
pub mod openai;
