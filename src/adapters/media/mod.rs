pub mod heif;
