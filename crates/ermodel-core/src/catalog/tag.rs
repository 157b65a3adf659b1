//! Well-known annotation tags understood by the web front-end.

pub const DISPLAY: &str = "tag:misd.isi.edu,2015:display";
pub const TABLE_DISPLAY: &str = "tag:isrd.isi.edu,2016:table-display";
pub const COLUMN_DISPLAY: &str = "tag:isrd.isi.edu,2016:column-display";
pub const KEY_DISPLAY: &str = "tag:isrd.isi.edu,2017:key-display";
pub const VISIBLE_COLUMNS: &str = "tag:isrd.isi.edu,2016:visible-columns";
pub const VISIBLE_FOREIGN_KEYS: &str = "tag:isrd.isi.edu,2016:visible-foreign-keys";
pub const FOREIGN_KEY: &str = "tag:isrd.isi.edu,2016:foreign-key";
pub const GENERATED: &str = "tag:isrd.isi.edu,2016:generated";
pub const IMMUTABLE: &str = "tag:isrd.isi.edu,2016:immutable";
pub const NON_DELETABLE: &str = "tag:isrd.isi.edu,2016:non-deletable";
pub const APP_LINKS: &str = "tag:isrd.isi.edu,2016:app-links";
pub const ASSET: &str = "tag:isrd.isi.edu,2017:asset";
pub const BULK_UPLOAD: &str = "tag:isrd.isi.edu,2017:bulk-upload";
pub const CHAISE_CONFIG: &str = "tag:isrd.isi.edu,2019:chaise-config";
pub const SOURCE_DEFINITIONS: &str = "tag:isrd.isi.edu,2019:source-definitions";
pub const EXPORT: &str = "tag:isrd.isi.edu,2019:export";
