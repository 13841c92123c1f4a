//! Record types, in their stored and API forms.

pub mod api;
pub mod db;
pub mod mongodb;
