// wttr_exporter - Prometheus metrics exporter for wttr.in
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only record of poll outcomes, one line per cycle, mirrored to stdout.
///
/// Lines are of the form `[<local timestamp>] - <message>` where the timestamp is
/// the start of the poll cycle being recorded. The file grows without bound; there
/// is no rotation.
#[derive(Debug)]
pub struct Journal {
    file: File,
}

impl Journal {
    /// Open the journal at the given path for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Journal { file })
    }

    /// Record a successful cycle along with the source-reported observation time.
    pub fn success(&mut self, started: &DateTime<Local>, observed_at: &str) -> io::Result<()> {
        self.append(started, &format!("Last measurement has been taken at: {}", observed_at))
    }

    /// Record a failed cycle. Fetch and extraction failures are not distinguished here.
    pub fn failure(&mut self, started: &DateTime<Local>) -> io::Result<()> {
        self.append(started, "Request failed")
    }

    fn append(&mut self, started: &DateTime<Local>, message: &str) -> io::Result<()> {
        let line = format!("[{}] - {}", started.format(TIMESTAMP_FORMAT), message);
        println!("{}", line);
        writeln!(self.file, "{}", line)
    }
}
