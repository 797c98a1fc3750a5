mod files;
mod misc;
