pub mod khalti;
