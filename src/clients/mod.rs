pub mod app_service_client;

pub use app_service_client::AppServiceClient;
