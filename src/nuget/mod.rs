//! NuGet target framework handling
//!
//! This module provides:
//! - Normalization of catalog-style monikers to short folder names
//! - Display names for .NET Framework and Mono/Xamarin monikers
//! - The compatibility closure of a set of declared frameworks

mod tfm;

pub use tfm::{
    compute_all_tfms_with_status, normalize_tfm_for_lookup, normalized_tfm_to_display, TfmStatus,
};
