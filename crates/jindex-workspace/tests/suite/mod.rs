mod enumeration;
mod rescan;
