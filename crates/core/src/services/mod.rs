pub mod price_service;
pub mod rate_service;
pub mod valuation_service;
