// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Extension given to every downloaded episode
pub const AUDIO_EXTENSION: &str = "mp3";

/// Characters that are not allowed in filenames on common filesystems
const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_reserved(c: char) -> bool {
    RESERVED_CHARS.contains(&c)
}

/// Replace every reserved character in a title with a single underscore.
///
/// Everything else passes through untouched: no trimming, truncation or
/// normalization. Distinct titles can therefore map to the same name.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect()
}

/// Generate the on-disk filename for an episode title
pub fn episode_filename(title: &str) -> String {
    format!("{}.{}", sanitize_title(title), AUDIO_EXTENSION)
}
