pub mod aggregate_user_data;
