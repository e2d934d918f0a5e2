pub mod report_handler;

pub use report_handler::{
    __path_create_report, __path_list_reports, __path_list_reports_by_business, create_report,
    list_reports, list_reports_by_business,
};
