#[cfg(test)]
mod controller_tests;
#[cfg(test)]
mod hierarchy_tests;
#[cfg(test)]
mod report_tests;
