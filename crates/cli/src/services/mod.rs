pub mod custody;
pub mod flow;
pub mod http;

pub use custody::BankrClient;
pub use flow::FlowClient;
pub use http::JsonApi;
