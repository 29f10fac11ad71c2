pub mod fetch_token_details;
pub mod serializer;
pub mod token_conversion;
pub mod usd_rates;
pub mod utils;
