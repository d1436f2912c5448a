use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::evr::Evr;
use crate::header::{warn_length_mismatch, Header};
use crate::lead::Lead;
use crate::reader::ParseLimits;
use crate::tag::*;

/// A parsed RPM package: the lead plus both headers, with typed accessors
/// over the well-known tags layered on top of the raw tag map.
#[derive(Clone, Debug)]
pub struct Package {
    pub lead: Lead,
    pub signature: Header,
    pub header: Header,
}

impl Package {
    /// Parses lead, signature header, and main header from a sequential,
    /// non-seekable stream. The stream is left positioned at the start of
    /// the (unparsed) payload.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Package> {
        Package::parse_with_limits(reader, ParseLimits::default())
    }

    pub fn parse_with_limits<R: Read>(reader: &mut R, limits: ParseLimits) -> Result<Package> {
        let lead = Lead::read(reader)?;
        debug!("lead: {} {}.{}", lead.name, lead.version_major, lead.version_minor);
        let signature = Header::read(reader, true, limits)?;
        let header = Header::read(reader, false, limits)?;
        Ok(Package {
            lead,
            signature,
            header,
        })
    }

    /// Convenience wrapper that opens and parses a file on disk. Does not
    /// expose the payload: the caller should reopen the file to stream it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Package> {
        let mut file = File::open(path)?;
        Package::parse(&mut file)
    }

    pub fn name(&self) -> String {
        self.header.tag(TAG_NAME).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn version(&self) -> String {
        self.header.tag(TAG_VERSION).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn release(&self) -> String {
        self.header.tag(TAG_RELEASE).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn epoch(&self) -> i64 {
        self.header.tag(TAG_EPOCH).map(|t| t.as_i64()).unwrap_or(0)
    }

    pub fn evr(&self) -> Evr {
        Evr::new(self.epoch().to_string(), self.version(), self.release())
    }

    pub fn architecture(&self) -> String {
        self.header.tag(TAG_ARCH).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn summary(&self) -> String {
        self.header
            .tag(TAG_SUMMARY)
            .map(|t| t.as_strings().join("\n"))
            .unwrap_or_default()
    }

    pub fn description(&self) -> String {
        self.header
            .tag(TAG_DESCRIPTION)
            .map(|t| t.as_strings().join("\n"))
            .unwrap_or_default()
    }

    pub fn license(&self) -> String {
        self.header.tag(TAG_LICENSE).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn vendor(&self) -> String {
        self.header.tag(TAG_VENDOR).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn packager(&self) -> String {
        self.header.tag(TAG_PACKAGER).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn url(&self) -> String {
        self.header.tag(TAG_URL).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn operating_system(&self) -> String {
        self.header.tag(TAG_OS).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn source_rpm(&self) -> String {
        self.header.tag(TAG_SOURCERPM).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn platform(&self) -> String {
        self.header.tag(TAG_PLATFORM).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn rpm_version(&self) -> String {
        self.header.tag(TAG_RPMVERSION).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn build_time(&self) -> i64 {
        self.header.tag(TAG_BUILDTIME).map(|t| t.as_i64()).unwrap_or(0)
    }

    pub fn build_host(&self) -> String {
        self.header.tag(TAG_BUILDHOST).map(|t| t.as_string()).unwrap_or_default()
    }

    /// Present only on installed systems; absent on freshly built packages.
    pub fn install_time(&self) -> Option<i64> {
        self.header.tag(TAG_INSTALLTIME).map(|t| t.as_i64())
    }

    pub fn size(&self) -> i64 {
        self.header.tag(TAG_SIZE).map(|t| t.as_i64()).unwrap_or(0)
    }

    pub fn archive_size(&self) -> i64 {
        self.signature
            .tag(SIGTAG_PAYLOADSIZE64)
            .map(|t| t.as_i64())
            .or_else(|| self.header.tag(TAG_ARCHIVESIZE).map(|t| t.as_i64()))
            .unwrap_or(0)
    }

    pub fn distribution(&self) -> String {
        self.header.tag(TAG_DISTRIBUTION).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn groups(&self) -> Vec<String> {
        self.header.tag(TAG_GROUP).map(|t| t.as_strings()).unwrap_or_default()
    }

    pub fn change_log(&self) -> Vec<String> {
        self.header.tag(TAG_CHANGELOG).map(|t| t.as_strings()).unwrap_or_default()
    }

    pub fn source(&self) -> Vec<String> {
        self.header.tag(TAG_SOURCE).map(|t| t.as_strings()).unwrap_or_default()
    }

    pub fn patch(&self) -> Vec<String> {
        self.header.tag(TAG_PATCH).map(|t| t.as_strings()).unwrap_or_default()
    }

    pub fn old_filenames(&self) -> Vec<String> {
        self.header.tag(TAG_OLDFILENAMES).map(|t| t.as_strings()).unwrap_or_default()
    }

    pub fn gif_image(&self) -> Option<&[u8]> {
        self.header.tag(TAG_GIF).and_then(|t| t.as_bytes_ref())
    }

    pub fn xpm_image(&self) -> Option<&[u8]> {
        self.header.tag(TAG_XPM).and_then(|t| t.as_bytes_ref())
    }

    pub fn icon(&self) -> Option<&[u8]> {
        self.header.tag(TAG_ICON).and_then(|t| t.as_bytes_ref())
    }

    pub fn pre_install_script(&self) -> Option<&str> {
        self.header.tag(TAG_PREIN).and_then(|t| t.as_string_ref())
    }

    pub fn post_install_script(&self) -> Option<&str> {
        self.header.tag(TAG_POSTIN).and_then(|t| t.as_string_ref())
    }

    pub fn pre_uninstall_script(&self) -> Option<&str> {
        self.header.tag(TAG_PREUN).and_then(|t| t.as_string_ref())
    }

    pub fn post_uninstall_script(&self) -> Option<&str> {
        self.header.tag(TAG_POSTUN).and_then(|t| t.as_string_ref())
    }

    pub fn payload_format(&self) -> String {
        self.header.tag(TAG_PAYLOADFORMAT).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn payload_compression(&self) -> String {
        self.header.tag(TAG_PAYLOADCOMPRESSOR).map(|t| t.as_string()).unwrap_or_default()
    }

    pub fn requires(&self) -> Vec<Dependency> {
        self.dependencies(TAG_REQUIREFLAGS, TAG_REQUIRENAME, TAG_REQUIREVERSION)
    }

    pub fn provides(&self) -> Vec<Dependency> {
        self.dependencies(TAG_PROVIDEFLAGS, TAG_PROVIDENAME, TAG_PROVIDEVERSION)
    }

    pub fn conflicts(&self) -> Vec<Dependency> {
        self.dependencies(TAG_CONFLICTFLAGS, TAG_CONFLICTNAME, TAG_CONFLICTVERSION)
    }

    pub fn obsoletes(&self) -> Vec<Dependency> {
        self.dependencies(TAG_OBSOLETEFLAGS, TAG_OBSOLETENAME, TAG_OBSOLETEVERSION)
    }

    pub fn recommends(&self) -> Vec<Dependency> {
        self.dependencies(TAG_RECOMMENDFLAGS, TAG_RECOMMENDNAME, TAG_RECOMMENDVERSION)
    }

    pub fn suggests(&self) -> Vec<Dependency> {
        self.dependencies(TAG_SUGGESTFLAGS, TAG_SUGGESTNAME, TAG_SUGGESTVERSION)
    }

    pub fn supplements(&self) -> Vec<Dependency> {
        self.dependencies(TAG_SUPPLEMENTFLAGS, TAG_SUPPLEMENTNAME, TAG_SUPPLEMENTVERSION)
    }

    pub fn enhances(&self) -> Vec<Dependency> {
        self.dependencies(TAG_ENHANCEFLAGS, TAG_ENHANCENAME, TAG_ENHANCEVERSION)
    }

    fn dependencies(&self, flags_tag: u32, names_tag: u32, versions_tag: u32) -> Vec<Dependency> {
        let flags = self.header.tag(flags_tag).map(|t| t.as_i64s()).unwrap_or_default();
        let names = self.header.tag(names_tag).map(|t| t.as_strings()).unwrap_or_default();
        let versions = self.header.tag(versions_tag).map(|t| t.as_strings()).unwrap_or_default();

        warn_length_mismatch("dependency", &[flags.len(), names.len(), versions.len()]);

        names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let flags = *flags.get(i)?;
                let raw_version = versions.get(i).cloned().unwrap_or_default();
                let (epoch, version, release) = Evr::parse_values(&raw_version);
                Some(Dependency {
                    name,
                    flags,
                    epoch: epoch.to_string(),
                    version: version.to_string(),
                    release: release.to_string(),
                })
            })
            .collect()
    }

    pub fn files(&self) -> Vec<FileInfo> {
        let dir_index = self.header.tag(TAG_DIRINDEXES).map(|t| t.as_i64s()).unwrap_or_default();
        let basenames = self.header.tag(TAG_BASENAMES).map(|t| t.as_strings()).unwrap_or_default();
        let dirnames = self.header.tag(TAG_DIRNAMES).map(|t| t.as_strings()).unwrap_or_default();
        let modes = self.header.tag(TAG_FILEMODES).map(|t| t.as_i64s()).unwrap_or_default();
        let sizes = self.header.tag(TAG_FILESIZES).map(|t| t.as_i64s()).unwrap_or_default();
        let mtimes = self.header.tag(TAG_FILEMTIMES).map(|t| t.as_i64s()).unwrap_or_default();
        let digests = self.header.tag(TAG_FILEDIGESTS).map(|t| t.as_strings()).unwrap_or_default();
        let linktos = self.header.tag(TAG_FILELINKTOS).map(|t| t.as_strings()).unwrap_or_default();
        let users = self.header.tag(TAG_FILEUSERNAME).map(|t| t.as_strings()).unwrap_or_default();
        let groups = self.header.tag(TAG_FILEGROUPNAME).map(|t| t.as_strings()).unwrap_or_default();

        warn_length_mismatch("file", &[dir_index.len(), basenames.len(), modes.len()]);

        basenames
            .into_iter()
            .enumerate()
            .map(|(i, basename)| {
                let dir = dir_index
                    .get(i)
                    .and_then(|&d| dirnames.get(d as usize))
                    .cloned()
                    .unwrap_or_default();
                let mode = modes.get(i).copied().unwrap_or(0) as u32;
                FileInfo {
                    path: format!("{}{}", dir, basename),
                    mode: PortableMode::from_raw(mode),
                    size: sizes.get(i).copied().unwrap_or(0),
                    mtime: mtimes.get(i).copied().unwrap_or(0),
                    digest: digests.get(i).cloned().unwrap_or_default(),
                    link_target: linktos.get(i).cloned().unwrap_or_default(),
                    owner: users.get(i).cloned().unwrap_or_default(),
                    group: groups.get(i).cloned().unwrap_or_default(),
                }
            })
            .collect()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.{}",
            self.name(),
            self.version(),
            self.release(),
            self.architecture()
        )
    }
}

/// A single dependency relationship (requires/provides/conflicts/obsoletes/…).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub flags: i64,
    pub epoch: String,
    pub version: String,
    pub release: String,
}

impl Dependency {
    fn operator(&self) -> Option<&'static str> {
        let lesser_or_equal = DEP_FLAG_EQUAL | DEP_FLAG_LESS;
        let greater_or_equal = DEP_FLAG_EQUAL | DEP_FLAG_GREATER;
        if self.flags & lesser_or_equal == lesser_or_equal {
            Some("<=")
        } else if self.flags & greater_or_equal == greater_or_equal {
            Some(">=")
        } else if self.flags & DEP_FLAG_EQUAL != 0 {
            Some("=")
        } else if self.flags & DEP_FLAG_LESS != 0 {
            Some("<")
        } else if self.flags & DEP_FLAG_GREATER != 0 {
            Some(">")
        } else {
            None
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator() {
            None => write!(f, "{}", self.name),
            Some(op) => {
                let evr = if self.release.is_empty() {
                    self.version.clone()
                } else {
                    format!("{}.{}", self.version, self.release)
                };
                write!(f, "{} {} {}", self.name, op, evr)
            }
        }
    }
}

/// A POSIX file mode decomposed into portable fields, reconstructed from the
/// packed `stat` mode RPM stores per file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortableMode {
    pub permissions: u32,
    pub file_type: FileKind,
    pub setuid: bool,
    pub setgid: bool,
    pub sticky: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    CharDevice,
    BlockDevice,
    Fifo,
    Symlink,
    Socket,
}

impl PortableMode {
    pub fn from_raw(mode: u32) -> PortableMode {
        const S_IFMT: u32 = 0xF000;
        const S_IFSOCK: u32 = 0xC000;
        const S_IFLNK: u32 = 0xA000;
        const S_IFBLK: u32 = 0x6000;
        const S_IFDIR: u32 = 0x4000;
        const S_IFCHR: u32 = 0x2000;
        const S_IFIFO: u32 = 0x1000;

        let file_type = match mode & S_IFMT {
            S_IFSOCK => FileKind::Socket,
            S_IFLNK => FileKind::Symlink,
            S_IFBLK => FileKind::BlockDevice,
            S_IFDIR => FileKind::Directory,
            S_IFCHR => FileKind::CharDevice,
            S_IFIFO => FileKind::Fifo,
            _ => FileKind::Regular,
        };

        PortableMode {
            permissions: mode & 0o777,
            file_type,
            setuid: mode & 0o4000 != 0,
            setgid: mode & 0o2000 != 0,
            sticky: mode & 0o1000 != 0,
        }
    }
}

/// A single file entry from a package's payload manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub mode: PortableMode,
    pub size: i64,
    pub mtime: i64,
    pub digest: String,
    pub link_target: String,
    pub owner: String,
    pub group: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_formats_lesser_or_equal() {
        let dep = Dependency {
            name: "test".into(),
            flags: DEP_FLAG_LESS | DEP_FLAG_EQUAL,
            epoch: String::new(),
            version: "1".into(),
            release: "2".into(),
        };
        assert_eq!(dep.to_string(), "test <= 1.2");
    }

    #[test]
    fn dependency_formats_unversioned() {
        let dep = Dependency {
            name: "/bin/sh".into(),
            flags: 0,
            epoch: String::new(),
            version: String::new(),
            release: String::new(),
        };
        assert_eq!(dep.to_string(), "/bin/sh");
    }

    #[test]
    fn portable_mode_decodes_directory_and_sticky_bit() {
        let mode = PortableMode::from_raw(0o041777);
        assert_eq!(mode.file_type, FileKind::Directory);
        assert!(mode.sticky);
        assert_eq!(mode.permissions, 0o777);
    }

    #[test]
    fn portable_mode_decodes_symlink() {
        let mode = PortableMode::from_raw(0o120777);
        assert_eq!(mode.file_type, FileKind::Symlink);
    }

    #[test]
    fn script_and_bin_tag_accessors_default_to_none() {
        let package = Package {
            lead: Lead {
                version_major: 3,
                version_minor: 0,
                package_type: 0,
                architecture: 0,
                name: String::new(),
                operating_system: 0,
                signature_type: 0,
            },
            signature: Header::default(),
            header: Header::default(),
        };
        assert_eq!(package.pre_install_script(), None);
        assert_eq!(package.gif_image(), None);
        assert!(package.change_log().is_empty());
    }
}
