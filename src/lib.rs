//! Relighting of static scenes from a wavelet-compressed light transport.
//!
//! A scene is rendered offline once per environment texel. These basis images
//! are reorganized into a transport matrix which is optionally projected onto
//! a Haar wavelet basis. At runtime the current environment map is projected
//! onto the same basis, its coefficients are ranked by importance and only
//! the `top_k` most important terms are recombined into the displayed frame.

#![deny(unsafe_code)]

macro_rules! export {
    [$( $module:ident ),* $(,)*] => {
        $(
            mod $module;
            pub use self::$module::*;
        )*
    };
}

pub mod metrics;

export![device, engine, error, scene];
