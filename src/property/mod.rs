//! Real-estate listings a user tracks alongside their finances.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod update_endpoint;

pub use core::{
    NewProperty, Property, PropertyStatus, PropertyType, PropertyUpdate, count_properties,
    create_property, create_property_table, delete_property, get_owned_property, list_properties,
    map_row_to_property, update_property,
};
pub use create_endpoint::create_property_endpoint;
pub use delete_endpoint::delete_property_endpoint;
pub use get_endpoint::get_property_endpoint;
pub use list_endpoint::list_properties_endpoint;
pub use update_endpoint::update_property_endpoint;
