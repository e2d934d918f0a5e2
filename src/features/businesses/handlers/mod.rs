pub mod business_handler;

pub use business_handler::{
    __path_create_business, __path_get_business, __path_list_businesses, create_business,
    get_business, list_businesses,
};
