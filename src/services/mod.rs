pub mod ephemeris;
pub mod yield_estimator;
pub mod tracker_service;
pub mod weather_service;
