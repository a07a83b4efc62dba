// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod fetch;
mod parse;

pub use fetch::{fetch_feed_bytes, file_path_to_url, is_url, load_feed, read_feed_file};
pub use parse::{
    DEFAULT_COPYRIGHT, DEFAULT_DESCRIPTION, DEFAULT_EPISODE_TITLE, DEFAULT_TITLE, Enclosure,
    Episode, Feed, parse_feed,
};
