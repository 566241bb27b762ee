pub mod synthetic_road;
