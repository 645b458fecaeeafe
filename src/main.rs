fn main() {
    worklog_lib::run()
}
