use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    InvalidArguments(String), // 命令行参数非法或越界
    Io(std::io::Error),       // 底层 I/O 错误
    Format(String),           // 魔数不对或超级块不可读
    Layout(String),           // 格式化时空间不够放下必需的区域
    FileTooLarge { size: u64, blocks: u64 }, // 超出 12 个直接块
    NoFreeInodes,             // inode 已满
    InsufficientSpace { needed: u64, available: u64 }, // 空闲数据块不够
    DirectoryFull,            // 根目录唯一的数据块没有空槽
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

// 记录编解码失败只可能是镜像内容有问题
impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Format(format!("record decoding failed: {}", e))
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::Format(msg) => write!(f, "Invalid image: {}", msg),
            Self::Layout(msg) => write!(f, "Layout error: {}", msg),
            Self::FileTooLarge { size, blocks } => write!(
                f,
                "File too large: {} bytes needs {} blocks, at most {} direct blocks are supported",
                size,
                blocks,
                crate::fs::config::DIRECT_PTRS
            ),
            Self::NoFreeInodes => write!(f, "No free inode available"),
            Self::InsufficientSpace { needed, available } => write!(
                f,
                "Not enough free data blocks: needed {}, found {}",
                needed, available
            ),
            Self::DirectoryFull => write!(f, "Root directory is full"),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
