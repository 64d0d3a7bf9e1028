// SPDX-License-Identifier: GPL-3.0-only

//! Hardware-facing backends: camera capture and audio feedback

pub mod audio;
pub mod camera;
