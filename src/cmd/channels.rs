use retrokanal::channels::ChannelRouter;

pub fn cmd_channels() {
    let router = ChannelRouter::new();
    for info in router.channels() {
        println!("{:<12} {:<4} {}", info.code, info.language, info.name);
    }
}
