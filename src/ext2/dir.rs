use super::Ext2;
use crate::ext2_defs::*;
use crate::prelude::*;

impl Ext2 {
    /// Look up `name` in the root directory and read the inode it names.
    ///
    /// The name must match an entry exactly: same length, same bytes,
    /// case-sensitive. No path components are interpreted.
    pub fn find_in_root(&self, name: &str) -> Result<InodeRef> {
        let root = self.read_root_inode()?;
        if !root.inode.is_dir() {
            error!("Root is not a directory");
            return_error!(ErrCode::ENOTDIR, "Root inode is {:?}", root.inode.file_type());
        }
        self.lookup(&root, name)
    }

    /// Look up `name` among the entries of directory `dir` and read the
    /// inode it names.
    pub fn lookup(&self, dir: &InodeRef, name: &str) -> Result<InodeRef> {
        let entry = self.dir_find_entry(dir, name.as_bytes())?;
        self.read_inode(entry.inode())
    }

    /// List the live entries of directory `dir`.
    pub fn list_dir(&self, dir: &InodeRef) -> Result<Vec<DirEntry>> {
        info!("Dir get all entries: dir {}", dir.id);
        Self::check_dir(dir)?;
        let Some(block) = self.dir_first_block(dir)? else {
            return Ok(Vec::new());
        };
        let entries: Vec<DirEntry> =
            DirEntryIter::new(&block.data, dir.inode.size() as usize).collect();
        debug!("Dir {} has {} entries", dir.id, entries.len());
        Ok(entries)
    }

    /// List the live entries of the root directory.
    pub fn list_root(&self) -> Result<Vec<DirEntry>> {
        let root = self.read_root_inode()?;
        self.list_dir(&root)
    }

    /// Find a directory entry that matches a given name under a directory
    fn dir_find_entry(&self, dir: &InodeRef, name: &[u8]) -> Result<DirEntry> {
        info!(
            "Dir find entry: dir {}, name {}",
            dir.id,
            String::from_utf8_lossy(name)
        );
        Self::check_dir(dir)?;
        let Some(block) = self.dir_first_block(dir)? else {
            return_error!(ErrCode::ENOENT, "Directory {} is empty", dir.id);
        };
        let found = DirEntryIter::new(&block.data, dir.inode.size() as usize)
            .find(|de| de.compare_name(name));
        found.ok_or_else(|| {
            format_error!(
                ErrCode::ENOENT,
                "No entry {} in directory {}",
                String::from_utf8_lossy(name),
                dir.id
            )
        })
    }

    /// Load the first data block of a directory. Entries in later blocks
    /// are not visited. A directory without data blocks has no entries.
    fn dir_first_block(&self, dir: &InodeRef) -> Result<Option<Block<'_>>> {
        match dir.inode.block[0] {
            0 => Ok(None),
            block_id => self.read_block(block_id as PBlockId).map(Some),
        }
    }

    fn check_dir(dir: &InodeRef) -> Result<()> {
        if !dir.inode.is_dir() {
            return_error!(ErrCode::ENOTDIR, "Inode {} is not a directory", dir.id);
        }
        Ok(())
    }
}
