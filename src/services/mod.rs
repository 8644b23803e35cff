pub mod analytics;
pub mod crm;
pub mod dispatcher;
pub mod nlu;
pub mod response;
