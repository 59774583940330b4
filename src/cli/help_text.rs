pub(super) const ROOT_LONG_ABOUT: &str = "\
Baseline a directory tree and check it for changes

fimcheck records a SHA-256 checksum of every regular file below a directory in a
single baseline file, and later re-hashes the tree to report which files were
modified, added or removed since.

CORE CONCEPTS:

  Baseline file:
    A JSON document (baseline.json in the current directory by default) holding
    the resolved root directory and the checksum of every file, keyed by its path
    relative to the root with '/' as separator. Only one baseline is kept;
    building a new one replaces it.

  Operations:
    - baseline: Create or replace the baseline for a directory
    - check: Re-hash the baseline's directory and report what changed

TYPICAL WORKFLOW:

  1. Record the current state:
     $ fimcheck baseline --dir /etc/myapp

  2. Later, check for changes:
     $ fimcheck check

  3. After reviewing the changes, accept them:
     $ fimcheck baseline --dir /etc/myapp --fingerprint <FINGERPRINT>

Run without a command in a terminal for an interactive menu.

GLOBAL OPTIONS:

  -C <DIRECTORY>
    Change to directory before operating (like git -C or make -C). Relative
    baseline file paths are resolved after changing directory.

  --baseline-file <PATH>
    Where the baseline is kept. Defaults to baseline.json.

EXIT CODES:

  0    Success, or no changes found
  1    check found changes
  2    No baseline exists yet
  255  Any other error

COMMON USE CASES:

  Scheduled audit:
    $ fimcheck --baseline-file /var/lib/fim/app.json check || alert_admin

  Safe update workflow (prevents TOCTOU):
    $ fimcheck check > review.txt
    $ cat review.txt  # Review changes
    $ FP=$(grep '^Fingerprint:' review.txt | cut -d' ' -f2)
    $ fimcheck baseline --dir /etc/myapp --fingerprint $FP
";

pub(super) const BASELINE_LONG_ABOUT: &str = "\
Create or replace the baseline for a directory

Recursively hashes every regular file below DIR and stores the checksums,
together with the resolved absolute path of DIR, in the baseline file. Any
previous baseline is replaced atomically: a concurrent reader sees either the
old or the new baseline, never a partial one.

WHAT IS RECORDED:

  - Regular files, by content (SHA-256). Timestamps and permissions are ignored.
  - Symlinks to files, by the content of their target.
  - Directories are traversed but not recorded, so empty directories are
    invisible.
  - Symlinks to directories are not followed.
  - FIFOs, sockets and device files are skipped.
  - The baseline file itself, if it lives inside DIR.

Any file that cannot be read (including broken symlinks) aborts the operation;
no partial baseline is ever written.

FINGERPRINT VALIDATION:

  With --fingerprint, the baseline is only replaced if the changes since the
  existing baseline match the fingerprint printed by 'fimcheck check'. This
  guarantees that what gets recorded is exactly what you reviewed.
";

pub(super) const CHECK_LONG_ABOUT: &str = "\
Check the baseline's directory for changes

Loads the baseline, re-hashes the directory it was built for and prints one
line per changed file:

  M  file was modified (content differs)
  A  file was added since the baseline
  R  file was removed since the baseline

A summary line naming the directory checked always follows. When there were
changes the output ends with a fingerprint identifying this exact set of
changes, for use with 'fimcheck baseline --fingerprint'.

The directory checked is the one recorded in the baseline, regardless of the
current directory. Use --dir to check a moved or copied tree instead. If the
baseline file lives inside its tree, its copy at the same place in the other
tree is ignored too.
";
