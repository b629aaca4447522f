mod helpers;

mod proxy {
    mod launcher_options;
    #[cfg(unix)]
    mod process;
}

mod server {
    mod tcp;
}

mod session {
    mod lifecycle;
    mod shims;
}
