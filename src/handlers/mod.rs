pub mod post_handlers;
