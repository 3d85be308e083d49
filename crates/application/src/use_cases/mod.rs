pub mod handle_query;
