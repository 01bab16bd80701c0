//! OLE/Compound File Binary parsing (components B, C, D).

pub mod dirent;
pub mod header;
pub mod sectors;

pub use dirent::{Dirent, DirentType};
pub use header::{CfbError, CfbHeader};

/// A parsed CFB container: header, FAT/MiniFAT, and the directory tree,
/// bundled so higher layers can resolve any dirent's stream without
/// re-deriving the sector tables each time.
pub struct CfbImage<'a> {
    pub header: CfbHeader,
    pub dirents: Vec<Dirent>,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    mini_stream: Vec<u8>,
    blob: &'a [u8],
}

pub const ROOT_SID: usize = 0;

impl<'a> CfbImage<'a> {
    #[tracing::instrument(skip_all)]
    pub fn open(blob: &'a [u8]) -> Result<Self, CfbError> {
        let header = CfbHeader::parse(blob)?;
        let fat = sectors::build_fat(blob, &header);
        let mini_fat = sectors::build_mini_fat(blob, &header, &fat);
        let dir_stream = sectors::read_stream(blob, &header, &fat, header.dir_start_sector);
        let dirents = dirent::parse_dirents(&dir_stream);

        let mini_stream = dirents
            .get(ROOT_SID)
            .map(|root| {
                sectors::read_stream(blob, &header, &fat, root.start_sector)
                    .into_iter()
                    .take(root.size as usize)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            header,
            dirents,
            fat,
            mini_fat,
            mini_stream,
            blob,
        })
    }

    pub fn children_of(&self, parent_sid: usize) -> Vec<usize> {
        dirent::children_in_order(&self.dirents, parent_sid)
    }

    pub fn find_child(&self, parent_sid: usize, name: &str) -> Option<usize> {
        dirent::find_child(&self.dirents, parent_sid, name)
    }

    /// Reads a dirent's stream content, routing through the mini stream for
    /// small non-root streams per the MS-CFB cutoff rule.
    pub fn read_stream(&self, sid: usize) -> Vec<u8> {
        let Some(dirent) = self.dirents.get(sid) else {
            return Vec::new();
        };
        if dirent.dirent_type == DirentType::Root {
            return sectors::read_stream(self.blob, &self.header, &self.fat, dirent.start_sector)
                .into_iter()
                .take(dirent.size as usize)
                .collect();
        }
        if dirent.size < self.header.mini_stream_cutoff as u64 {
            sectors::read_mini_stream(
                &self.header,
                &self.mini_fat,
                &self.mini_stream,
                dirent.start_sector,
                dirent.size,
            )
        } else {
            sectors::read_stream(self.blob, &self.header, &self.fat, dirent.start_sector)
                .into_iter()
                .take(dirent.size as usize)
                .collect()
        }
    }
}
