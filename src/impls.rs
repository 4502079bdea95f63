pub mod uploaders;
