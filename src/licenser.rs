//! License header stamping.
//!
//! Puts the project license header at the top of every C++, Luau and Python
//! file under a root. A stale header (any SPDX header block) is replaced; a
//! file already carrying the exact header is left untouched. Generated
//! artifacts are rendered with the same C++ header, so stamping them is a
//! no-op.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{CodegenError, Result};

pub const CPP_LICENSE_HEADER: &str = "// SPDX-License-Identifier: LGPL-3.0-or-later
/*******************************************************************************
 * shadowblox - https://git.seki.pw/Fumohouse/shadowblox
 *
 * Copyright 2025-present ksk.
 * Copyright 2025-present shadowblox contributors.
 *
 * Licensed under the GNU Lesser General Public License version 3.0 or later.
 * See COPYRIGHT.txt for more details.
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Lesser General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE. See the GNU Lesser General Public License for more
 * details.
 *
 * You should have received a copy of the GNU Lesser General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 ******************************************************************************/

";

pub const LUAU_LICENSE_HEADER: &str = "-- SPDX-License-Identifier: LGPL-3.0-or-later
--[============================================================================[
-- shadowblox - https://git.seki.pw/Fumohouse/shadowblox
--
-- Copyright 2025-present ksk.
-- Copyright 2025-present shadowblox contributors.
--
-- Licensed under the GNU Lesser General Public License version 3.0 or later.
-- See COPYRIGHT.txt for more details.
--
-- This program is free software: you can redistribute it and/or modify it under
-- the terms of the GNU Lesser General Public License as published by the Free
-- Software Foundation, either version 3 of the License, or (at your option)
-- any later version.
--
-- This program is distributed in the hope that it will be useful, but WITHOUT
-- ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
-- FOR A PARTICULAR PURPOSE. See the GNU Lesser General Public License for more
-- details.
--
-- You should have received a copy of the GNU Lesser General Public License
-- along with this program. If not, see <https://www.gnu.org/licenses/>.
--]============================================================================]

";

pub const PY_LICENSE_HEADER: &str = "# SPDX-License-Identifier: LGPL-3.0-or-later
################################################################################
# shadowblox - https://git.seki.pw/Fumohouse/shadowblox
#
# Copyright 2025-present ksk.
# Copyright 2025-present shadowblox contributors.
#
# Licensed under the GNU Lesser General Public License version 3.0 or later.
# See COPYRIGHT.txt for more details.
#
# This program is free software: you can redistribute it and/or modify it under
# the terms of the GNU Lesser General Public License as published by the Free
# Software Foundation, either version 3 of the License, or (at your option)
# any later version.
#
# This program is distributed in the hope that it will be useful, but WITHOUT
# ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
# FOR A PARTICULAR PURPOSE. See the GNU Lesser General Public License for more
# details.
#
# You should have received a copy of the GNU Lesser General Public License
# along with this program. If not, see <https://www.gnu.org/licenses/>.
################################################################################

";

lazy_static! {
    static ref CPP_HEADER_RE: Regex =
        Regex::new(r"\A// SPDX-License-Identifier: .*\n/\*[\s\S]*?\*/\n*").unwrap();
    static ref LUAU_HEADER_RE: Regex =
        Regex::new(r"\A-- SPDX-License-Identifier: .*\n--\[=*\[[\s\S]*?\]=*\]\n*").unwrap();
    static ref PY_HEADER_RE: Regex =
        Regex::new(r"\A# SPDX-License-Identifier: .*\n#{2,}\n[\s\S]*?#{2,}\n*").unwrap();
}

/// Comment syntax family of a stampable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    Cpp,
    Luau,
    Python,
}

impl HeaderStyle {
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "cpp" | "hpp" => Some(HeaderStyle::Cpp),
            "luau" => Some(HeaderStyle::Luau),
            "py" => Some(HeaderStyle::Python),
            _ => None,
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            HeaderStyle::Cpp => CPP_LICENSE_HEADER,
            HeaderStyle::Luau => LUAU_LICENSE_HEADER,
            HeaderStyle::Python => PY_LICENSE_HEADER,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            HeaderStyle::Cpp => &CPP_HEADER_RE,
            HeaderStyle::Luau => &LUAU_HEADER_RE,
            HeaderStyle::Python => &PY_HEADER_RE,
        }
    }
}

/// New contents with the header applied, or `None` if the file already
/// carries the exact header.
pub fn apply_header(contents: &str, style: HeaderStyle) -> Option<String> {
    let header = style.header();
    let body = match style.pattern().find(contents) {
        Some(existing) if existing.as_str().trim() == header.trim() => return None,
        Some(existing) => &contents[existing.end()..],
        None => contents,
    };
    Some(format!("{}{}", header, body))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampReport {
    pub stamped: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target"
}

/// Stamp every eligible file under `root`.
pub fn stamp_tree(root: &Path) -> Result<StampReport> {
    let mut report = StampReport::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            CodegenError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(style) = HeaderStyle::for_path(path) else {
            continue;
        };

        let contents = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        match apply_header(&contents, style) {
            Some(updated) => {
                fs::write(path, updated).map_err(|e| CodegenError::io(path, e))?;
                info!("Stamped {}", path.display());
                report.stamped.push(path.to_path_buf());
            }
            None => {
                debug!("SKIP {}", path.display());
                report.skipped.push(path.to_path_buf());
            }
        }
    }

    Ok(report)
}
