pub mod dashboard;
pub mod kpi;
pub mod panels;
pub mod plot;
pub mod table;
