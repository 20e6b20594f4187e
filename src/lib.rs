//! # 图片加载插件（文件 / URL）：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                宿主（节点运行时 / 前端）                  │
//! │      schema ── validate ── fingerprint ── execute        │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            插件（Rust）                          │
//! │                                                          │
//! │  ┌─ registry ──── 进程级操作表（启动时注册）              │
//! │  │                                                       │
//! │  ├─ image_loader   来源加载·解码·归一化                   │
//! │  │   ├─ policy         指纹 / 输入校验                    │
//! │  │   └─ normalizer     图像批次 + 遮罩批次                │
//! │  │                                                       │
//! │  ├─ namespace      受管输入目录（列表 / 解析 / 存在性）   │
//! │  └─ error ──────── AppError (统一错误类型)                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，宿主入口的返回类型 |
//! | [`image_loader`] | 从受管文件或 URL 加载图片，输出图像与遮罩批次 |
//! | [`namespace`] | 受管目录的文件列表、标注解析与越界拦截 |
//! | [`registry`] | 操作声明（schema）与进程级操作表 |

pub mod error;
pub mod image_loader;
pub mod namespace;
pub mod registry;
