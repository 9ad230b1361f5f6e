pub mod property_refresh_sync;
