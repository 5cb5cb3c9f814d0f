use another_ext2::{
    BlockDevice, DriveId, ErrCode, Ext2, Ext2Error, Result, EXT2_ROOT_INO, SECTOR_SIZE,
};
use log::warn;
use simple_logger::SimpleLogger;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

const IMAGE: &str = "ext2.img";
const STAGING: &str = "ext2_files";

#[derive(Debug)]
pub struct BlockFile(File);

impl BlockFile {
    pub fn new(path: &str) -> Self {
        let file = File::open(path).unwrap();
        Self(file)
    }
}

impl BlockDevice for BlockFile {
    fn read_sectors(&self, drive: DriveId, lba: u64, count: usize, buf: &mut [u8]) -> Result<()> {
        if drive != DriveId::Master {
            return Err(Ext2Error::new(ErrCode::EIO));
        }
        let mut file = &self.0;
        let len = count * SECTOR_SIZE;
        file.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))
            .and_then(|_| file.read_exact(&mut buf[..len]))
            .map_err(|e| {
                warn!("read_sectors lba {} count {}: {}", lba, count, e);
                Ext2Error::with_message(ErrCode::EIO, e.to_string())
            })
    }
}

fn logger_init() {
    SimpleLogger::new().init().unwrap();
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 1000) as u8).collect()
}

/// Files placed in the root directory of the test image
fn files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("hello.txt", b"Hello from the ext2 test image!\n".to_vec()),
        ("test.txt", b"Second file, used for lookup.\n".to_vec()),
        ("five.bin", pattern(5000)),
        ("big.bin", pattern(20000)),
    ]
}

fn make_ext2() {
    let _ = fs::remove_dir_all(STAGING);
    fs::create_dir_all(STAGING).unwrap();
    for (name, data) in files() {
        fs::write(format!("{}/{}", STAGING, name), data).unwrap();
    }
    let _ = std::process::Command::new("rm")
        .args(["-rf", IMAGE])
        .status();
    let _ = std::process::Command::new("dd")
        .args(["if=/dev/zero", &format!("of={}", IMAGE), "bs=1M", "count=4"])
        .status();
    let status = std::process::Command::new("mkfs.ext2")
        .args(["-q", "-F", "-b", "1024", "-d", STAGING, IMAGE])
        .status()
        .expect("mkfs.ext2 not found");
    assert!(status.success(), "mkfs.ext2 failed");
}

fn open_ext2() -> Ext2 {
    let file = BlockFile::new(IMAGE);
    Ext2::load(Arc::new(file), DriveId::Master).expect("open ext2 failed")
}

fn mount_test(ext2: &Ext2) {
    assert_eq!(ext2.block_size(), 1024);
    let sb = ext2.super_block();
    assert_eq!(
        ext2.groups_count(),
        sb.blocks_count().div_ceil(sb.blocks_per_group())
    );
    let root = ext2.read_inode(EXT2_ROOT_INO).expect("read root failed");
    assert!(root.inode.is_dir());
}

fn list_test(ext2: &Ext2) {
    let names: Vec<String> = ext2
        .list_root()
        .expect("list root failed")
        .iter()
        .map(|de| de.name().expect("bad name"))
        .collect();
    println!("root: {:?}", names);
    for expected in [".", "..", "lost+found", "hello.txt", "test.txt", "five.bin", "big.bin"] {
        assert!(names.iter().any(|n| n == expected), "{} missing", expected);
    }
}

fn read_test(ext2: &Ext2) {
    for (name, data) in files() {
        let file = ext2.find_in_root(name).expect("find failed");
        assert_eq!(file.inode.size(), data.len() as u64);
        let mut buf = vec![0u8; data.len()];
        let n = ext2.read_file(&file, &mut buf).expect("read failed");
        let expected = data.len().min(ext2.direct_capacity());
        assert_eq!(n, expected, "{}", name);
        assert_eq!(buf[..n], data[..n], "{}", name);
    }
}

fn lookup_error_test(ext2: &Ext2) {
    let err = ext2.find_in_root("nonexistent.txt").expect_err("found missing file");
    assert_eq!(err.code(), ErrCode::ENOENT);
    let err = ext2.find_in_root("HELLO.TXT").expect_err("lookup is case-insensitive");
    assert_eq!(err.code(), ErrCode::ENOENT);
    let err = ext2.read_inode(0).expect_err("inode 0 accepted");
    assert_eq!(err.code(), ErrCode::EBADINO);
    let dir = ext2.find_in_root("lost+found").expect("find failed");
    let mut buf = [0u8; 16];
    let err = ext2.read_file(&dir, &mut buf).expect_err("read a directory");
    assert_eq!(err.code(), ErrCode::ENOTREG);
}

fn main() {
    logger_init();
    log::set_max_level(log::LevelFilter::Off);
    make_ext2();
    println!("ext2.img created");
    let ext2 = open_ext2();
    println!("ext2 opened");
    mount_test(&ext2);
    println!("mount test done");
    list_test(&ext2);
    println!("list test done");
    log::set_max_level(log::LevelFilter::Debug);
    read_test(&ext2);
    println!("read test done");
    lookup_error_test(&ext2);
    println!("lookup error test done");
}
