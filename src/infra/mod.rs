pub mod air_service;
