//! Terminal map with named GeoJSON layer groups, single feature
//! selection and popups.

pub mod braille;
pub mod config;
pub mod data;
pub mod demo;
pub mod element;
pub mod error;
pub mod events;
pub mod layers;
pub mod map;
