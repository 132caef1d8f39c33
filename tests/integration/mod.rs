mod helpers;

mod test_build;
mod test_env;
mod test_errors;
mod test_promote;
mod test_release;
mod test_values;
