fn main() {
    if let Err(err) = wgpu_pathtracer::run() {
        eprintln!("Application error: {err}");
    }
}
