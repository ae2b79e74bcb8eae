// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pixfilters::{Displacement, Emboss, Region};

/// Displacement options.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct DisplaceOptions {
    /// Filter parameters.
    pub displacement: Displacement,

    /// A selection to process.
    ///
    /// `None` means the whole image.
    pub region: Option<Region>,
}

/// Emboss options.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct EmbossOptions {
    /// Filter parameters.
    pub emboss: Emboss,

    /// A selection to process.
    ///
    /// The actual working area is the selection grown by `emboss.depth`.
    /// `None` means the whole image.
    pub region: Option<Region>,
}
