pub mod gm;
