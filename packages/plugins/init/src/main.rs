fn main() {
    kiln_sdk::bootstrap::main(kiln_plugin_init::entry)
}
